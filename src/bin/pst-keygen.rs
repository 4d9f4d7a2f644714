//! Generate issuer key pairs in the form the issuer reads from its environment.
//!
//! ```text
//! pst-keygen --key-id 1 --count 2 --expiry 4133894400000
//! ```

use clap::Parser;
use pst_issuer::{generate_keyed_pair, KeyEntry, KeyId, KeyStore, P384Sha384, PstError};
use rand_core::OsRng;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(version, about = "Generate P-384 VOPRF key pairs with embedded key ids")]
struct Args {
    /// Id of the first generated key; further keys count up from here.
    #[clap(long, env = "PST_KEYGEN_KEY_ID", default_value_t = 1)]
    key_id: u32,

    /// Number of key pairs to generate.
    #[clap(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=6))]
    count: u32,

    /// Expiry written as `EXPIRY<n>` (epoch milliseconds).
    #[clap(long)]
    expiry: Option<u64>,

    /// Also print the key commitment JSON for the generated keys.
    #[clap(long)]
    commitment: bool,
}

fn main() -> Result<(), PstError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let suite = P384Sha384;
    let mut entries = Vec::new();
    for (slot, offset) in (1..).zip(0..args.count) {
        let key_id = KeyId(args.key_id.checked_add(offset).ok_or_else(|| PstError::Config("key id overflow".into()))?);
        let (private, public) = generate_keyed_pair(&suite, key_id, &mut OsRng)?;
        println!("PRIVATE_KEY{slot}={}", private.to_base64());
        println!("PUBLIC_KEY{slot}={}", public.to_base64());
        if let Some(expiry) = args.expiry {
            println!("EXPIRY{slot}={expiry}");
        }
        tracing::info!(slot, %key_id, "generated key pair");
        entries.push(KeyEntry::new(public, private, args.expiry.unwrap_or_default())?);
    }

    if args.commitment {
        let store = KeyStore::from_entries(entries)?;
        let json = store
            .publish_commitment()
            .to_json()
            .map_err(|e| PstError::Config(e.to_string()))?;
        println!("{json}");
    }
    Ok(())
}
