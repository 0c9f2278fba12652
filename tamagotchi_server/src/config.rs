use std::{env, io::Write, time::Duration};

use clearing_client::{ClearingConfig, FinancialInstitution, MessageHeader, Party, PersonId, CURRENT_ACCOUNT};
use log::*;
use rand::thread_rng;
use serde_json::json;
use tamagotchi_engine::helpers::{Certificate, CertificateSet, CertificateVerifier, KeySigner};
use tari_crypto::{
    keys::PublicKey,
    ristretto::{RistrettoPublicKey, RistrettoSecretKey},
    tari_utilities::hex::Hex,
};
use tempfile::NamedTempFile;
use tmg_common::Secret;

use crate::{errors::ServerError, tester::creditor_from_colon_separated_string};

const DEFAULT_TMG_HOST: &str = "127.0.0.1";
const DEFAULT_TMG_PORT: u16 = 8370;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/tamagotchi.db";
const DEFAULT_MERCHANT_ID: &str = "TAMAGOTCHI";
const DEFAULT_NETWORK_ID: &str = "NETWORK";
const DEFAULT_ORPHAN_RECHECK_DELAY: Duration = Duration::from_secs(5);
const DEFAULT_PAYOUTS_PER_CREDITOR: usize = 500;
const CERTIFICATE_ENVS: [&str; 2] = ["TMG_NETWORK_CERTIFICATE_1", "TMG_NETWORK_CERTIFICATE_2"];
const TESTER_CREDITOR_ENVS: [&str; 2] = ["TMG_TESTER_CREDITOR_1", "TMG_TESTER_CREDITOR_2"];

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Operator submitted amounts above this are lowered to it. No limit when `None`.
    pub max_amount: Option<u64>,
    pub merchant: MerchantConfig,
    pub signing: SigningConfig,
    /// The network's certificates, used to authenticate callbacks
    pub certificates: CertificateSet,
    pub clearing: ClearingConfig,
    pub orphans: OrphanConfig,
    pub tester: TesterConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_TMG_HOST.to_string(),
            port: DEFAULT_TMG_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_amount: None,
            merchant: MerchantConfig::default(),
            signing: SigningConfig::default(),
            certificates: CertificateSet::default(),
            clearing: ClearingConfig::default(),
            orphans: OrphanConfig::default(),
            tester: TesterConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env_or_default() -> Self {
        let host = env::var("TMG_HOST").ok().unwrap_or_else(|| DEFAULT_TMG_HOST.into());
        let port = env::var("TMG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for TMG_PORT. {e} Using the default, {DEFAULT_TMG_PORT}, instead."
                    );
                    DEFAULT_TMG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_TMG_PORT);
        let database_url = env::var("TMG_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ TMG_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let max_amount = env::var("TMG_MAX_AMOUNT").ok().and_then(|s| {
            s.parse::<u64>()
                .map_err(|e| warn!("🪛️ Ignoring invalid TMG_MAX_AMOUNT ({s}). {e}. Amounts will not be capped."))
                .ok()
        });
        let merchant = MerchantConfig::from_env_or_default();
        let signing = SigningConfig::try_from_env().unwrap_or_else(|e| {
            warn!("🪛️ Could not load the message signing key from the environment. {e}. Using a session key.");
            SigningConfig::default()
        });
        let certificates = load_certificates(&merchant.network_id);
        let clearing = ClearingConfig::new_from_env_or_default();
        let orphans = OrphanConfig::from_env_or_default();
        let tester = TesterConfig::from_env_or_default();
        Self { host, port, database_url, max_amount, merchant, signing, certificates, clearing, orphans, tester }
    }

    pub fn verifier(&self) -> CertificateVerifier {
        CertificateVerifier::new(
            self.merchant.network_id.as_str(),
            self.merchant.merchant_id.as_str(),
            self.certificates.clone(),
        )
    }
}

fn load_certificates(network_id: &str) -> CertificateSet {
    let mut certificates = CertificateSet::default();
    for name in CERTIFICATE_ENVS {
        let Ok(json) = env::var(name) else {
            debug!("🪛️ {name} is not set");
            continue;
        };
        match Certificate::from_json(&json) {
            Ok(cert) => {
                if cert.subject != network_id {
                    warn!(
                        "🪛️ The certificate in {name} belongs to {}, not {network_id}. It will never match a callback.",
                        cert.subject
                    );
                }
                info!("🪛️ Loaded network certificate {} from {name}", cert.public_key.to_hex());
                certificates.add(cert);
            },
            Err(e) => error!("🪛️ Invalid certificate in {name}. {e}"),
        }
    }
    if certificates.is_empty() {
        error!("🪛️ No network certificates are configured. Every callback will be rejected.");
    }
    certificates
}

//-----------------------------------------------  MerchantConfig  -----------------------------------------------------
/// Who we are on the clearing network, and the account that payouts are drawn from.
#[derive(Clone, Debug)]
pub struct MerchantConfig {
    pub merchant_id: String,
    pub network_id: String,
    pub legal_name: String,
    pub rut: String,
    pub fin_id: String,
    pub account_number: String,
    pub account_type: String,
    pub email: String,
}

impl Default for MerchantConfig {
    fn default() -> Self {
        Self {
            merchant_id: DEFAULT_MERCHANT_ID.to_string(),
            network_id: DEFAULT_NETWORK_ID.to_string(),
            legal_name: String::default(),
            rut: String::default(),
            fin_id: String::default(),
            account_number: String::default(),
            account_type: CURRENT_ACCOUNT.to_string(),
            email: String::default(),
        }
    }
}

impl MerchantConfig {
    pub fn from_env_or_default() -> Self {
        let merchant_id = env::var("TMG_MERCHANT_ID").ok().unwrap_or_else(|| {
            warn!("🪛️ TMG_MERCHANT_ID is not set. Using {DEFAULT_MERCHANT_ID}.");
            DEFAULT_MERCHANT_ID.to_string()
        });
        let network_id = env::var("TMG_NETWORK_ID").ok().unwrap_or_else(|| {
            warn!("🪛️ TMG_NETWORK_ID is not set. Using {DEFAULT_NETWORK_ID}.");
            DEFAULT_NETWORK_ID.to_string()
        });
        let account_field = |name: &str| {
            env::var(name).ok().unwrap_or_else(|| {
                error!("🪛️ {name} is not set. Payouts will carry an incomplete debtor account.");
                String::default()
            })
        };
        Self {
            merchant_id,
            network_id,
            legal_name: account_field("TMG_LEGAL_NAME"),
            rut: account_field("TMG_RUT"),
            fin_id: account_field("TMG_FI"),
            account_number: account_field("TMG_ACCOUNT_NUMBER"),
            account_type: CURRENT_ACCOUNT.to_string(),
            email: account_field("TMG_EMAIL"),
        }
    }

    /// The merchant as a party to a transaction: the debtor of payouts and the creditor of payins.
    pub fn party(&self) -> Party {
        Party {
            name: self.legal_name.clone(),
            identification: PersonId::chilean(self.rut.as_str()),
            financial_institution: FinancialInstitution::new(self.fin_id.as_str()),
            account: self.account_number.clone(),
            account_type: self.account_type.clone(),
            email: self.email.clone(),
        }
    }

    /// A fresh header for an envelope from the merchant to the network.
    pub fn outbound_header(&self) -> MessageHeader {
        MessageHeader::new(
            FinancialInstitution::new(self.merchant_id.as_str()),
            FinancialInstitution::new(self.network_id.as_str()),
        )
    }
}

//-----------------------------------------------  SigningConfig  ------------------------------------------------------
#[derive(Clone, Debug)]
pub struct SigningConfig {
    /// The merchant's secret key in hex, used to sign every outbound envelope
    pub signing_key: Secret<String>,
    /// Hex encoded public key matching `signing_key`. This is what the network must hold as our certificate.
    pub public_key: String,
}

impl Default for SigningConfig {
    fn default() -> Self {
        let mut tmpfile = NamedTempFile::new().ok().and_then(|f| f.keep().ok());
        warn!(
            "🚨️🚨️🚨️ The message signing key has not been set. I'm using a random value for this session. The \
             clearing network will reject everything signed with it until its public key is registered. 🚨️🚨️🚨️"
        );
        let mut rng = thread_rng();
        let (sk, pk) = RistrettoPublicKey::random_keypair(&mut rng);
        match &mut tmpfile {
            Some((f, p)) => {
                let key_data = json!({ "signing_key": sk.to_hex(), "public_key": pk.to_hex() }).to_string();
                match writeln!(f, "{key_data}") {
                    Ok(()) => warn!(
                        "🚨️🚨️🚨️ The signing key for this session was written to {}. Set TMG_SIGNING_KEY to keep \
                         using it. 🚨️🚨️🚨️",
                        p.to_str().unwrap_or("???")
                    ),
                    Err(e) => warn!("🪛️ Could not write the signing key to the temporary file. {e}"),
                }
            },
            None => {
                warn!("🪛️ Could not create a temporary file to store the signing key. ");
            },
        }
        Self { signing_key: Secret::new(sk.to_hex()), public_key: pk.to_hex() }
    }
}

impl SigningConfig {
    pub fn try_from_env() -> Result<Self, ServerError> {
        let hex = env::var("TMG_SIGNING_KEY")
            .map_err(|e| ServerError::ConfigurationError(format!("{e} [TMG_SIGNING_KEY]")))?;
        let sk = RistrettoSecretKey::from_hex(&hex)
            .map_err(|e| ServerError::ConfigurationError(format!("Invalid signing key in TMG_SIGNING_KEY: {e}")))?;
        let pk = RistrettoPublicKey::from_secret_key(&sk);
        Ok(Self { signing_key: Secret::new(hex), public_key: pk.to_hex() })
    }

    pub fn signer(&self) -> Result<KeySigner, ServerError> {
        KeySigner::from_hex(self.signing_key.reveal()).map_err(|e| ServerError::ConfigurationError(e.to_string()))
    }
}

//-----------------------------------------------  OrphanConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct OrphanConfig {
    /// Callbacks that still match nothing after the recheck are posted here verbatim
    pub forward_url: Option<String>,
    /// How long to wait before looking an orphaned callback up again
    pub recheck_delay: Duration,
}

impl Default for OrphanConfig {
    fn default() -> Self {
        Self { forward_url: None, recheck_delay: DEFAULT_ORPHAN_RECHECK_DELAY }
    }
}

impl OrphanConfig {
    pub fn from_env_or_default() -> Self {
        let forward_url = env::var("TMG_ORPHAN_FORWARD_URL").ok().filter(|s| !s.is_empty());
        if forward_url.is_none() {
            info!("🪛️ TMG_ORPHAN_FORWARD_URL is not set. Unmatched callbacks will only be logged.");
        }
        let recheck_delay = env::var("TMG_ORPHAN_RECHECK_DELAY")
            .map_err(|_| {
                info!(
                    "🪛️ TMG_ORPHAN_RECHECK_DELAY is not set. Using the default value of {}s.",
                    DEFAULT_ORPHAN_RECHECK_DELAY.as_secs()
                )
            })
            .and_then(|s| {
                s.parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|e| warn!("🪛️ Invalid configuration value for TMG_ORPHAN_RECHECK_DELAY. {e}"))
            })
            .ok()
            .unwrap_or(DEFAULT_ORPHAN_RECHECK_DELAY);
        Self { forward_url, recheck_delay }
    }
}

//-----------------------------------------------  TesterConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct TesterConfig {
    pub creditors: Vec<Party>,
    /// Number of single payouts sent to each creditor in a test batch
    pub payouts_per_creditor: usize,
    /// Also send multi-instruction envelopes
    pub multi_payouts: bool,
}

impl Default for TesterConfig {
    fn default() -> Self {
        Self { creditors: Vec::new(), payouts_per_creditor: DEFAULT_PAYOUTS_PER_CREDITOR, multi_payouts: false }
    }
}

impl TesterConfig {
    pub fn from_env_or_default() -> Self {
        let creditors = TESTER_CREDITOR_ENVS
            .iter()
            .filter_map(|&name| {
                let value = env::var(name).map_err(|_| warn!("🪛️ {name} is not set")).ok()?;
                creditor_from_colon_separated_string(&value)
                    .map_err(|e| error!("🪛️ Ignoring the creditor in {name}. {e}"))
                    .ok()
            })
            .collect::<Vec<_>>();
        if creditors.is_empty() {
            warn!("🪛️ No tester creditors are configured. Test suites will not send any payouts.");
        }
        let payouts_per_creditor = env::var("TMG_TESTER_PAYOUTS_PER_CREDITOR")
            .ok()
            .and_then(|s| {
                s.parse::<usize>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for TMG_TESTER_PAYOUTS_PER_CREDITOR. {e}"))
                    .ok()
            })
            .unwrap_or(DEFAULT_PAYOUTS_PER_CREDITOR);
        let multi_payouts = env::var("TMG_TESTER_MULTI_PAYOUTS").map(|s| &s == "1" || &s == "true").unwrap_or(false);
        Self { creditors, payouts_per_creditor, multi_payouts }
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// The part of the configuration that request handlers need. Keeps secrets out of the app data.
#[derive(Clone, Copy, Debug, Default)]
pub struct ServerOptions {
    pub max_amount: Option<u64>,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { max_amount: config.max_amount }
    }
}
