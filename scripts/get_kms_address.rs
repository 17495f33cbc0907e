use anyhow::Result;
use bridge_relayer::kms_signer::KmsSigner;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage: {} <KMS_KEY_ID> <AWS_REGION>", args[0]);
        std::process::exit(1);
    }

    let key_id = &args[1];
    let region = &args[2];
    println!("🔐 Deriving operator address from KMS key: {}", key_id);
    println!("🌍 Using AWS region: {}", region);

    let signer = KmsSigner::new(key_id.to_string(), Some(region.to_string()), 1).await?;
    let address = signer.address();

    println!("✅ Operator address: 0x{}", hex::encode(address.as_slice()));
    println!("💰 Fund this address on both the origin chain and the destination rollup");

    Ok(())
}
