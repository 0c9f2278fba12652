use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, OrphanCallbackEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub orphan_callback_producer: Vec<EventProducer<OrphanCallbackEvent>>,
}

impl EventProducers {
    pub async fn publish_orphan_callback(&self, event: OrphanCallbackEvent) {
        for producer in &self.orphan_callback_producer {
            producer.publish_event(event.clone()).await;
        }
    }
}

pub struct EventHandlers {
    pub on_orphan_callback: Option<EventHandler<OrphanCallbackEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_orphan_callback = hooks.on_orphan_callback.map(|f| EventHandler::new(buffer_size, f));
        Self { on_orphan_callback }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_orphan_callback {
            result.orphan_callback_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_orphan_callback {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_orphan_callback: Option<Handler<OrphanCallbackEvent>>,
}

impl EventHooks {
    pub fn on_orphan_callback<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrphanCallbackEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_orphan_callback = Some(Arc::new(f));
        self
    }
}
