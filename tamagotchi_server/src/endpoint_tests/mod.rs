mod callbacks;
mod helpers;
mod messages;
mod mocks;
mod tester;
