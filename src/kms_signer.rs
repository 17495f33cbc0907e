use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::signers::aws::AwsSigner;
use alloy::signers::Signer;
use anyhow::Result;
use aws_config::BehaviorVersion;
use aws_sdk_kms::Client as KmsClient;
use tracing::info;

/// Operator key held in AWS KMS.
#[derive(Clone)]
pub struct KmsSigner {
    signer: AwsSigner,
}

impl KmsSigner {
    pub async fn new(key_id: String, region: Option<String>, chain_id: u64) -> Result<Self> {
        info!("🔐 Initializing AWS KMS signer for chain {}", chain_id);

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(aws_sdk_kms::config::Region::new(region));
        }
        let config = loader.load().await;
        let kms_client = KmsClient::new(&config);

        let signer = AwsSigner::new(kms_client, key_id, Some(chain_id))
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create AWS signer: {}", e))?;

        info!("📍 KMS operator address: 0x{}", hex::encode(signer.address().as_slice()));
        Ok(Self { signer })
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn into_wallet(self) -> EthereumWallet {
        EthereumWallet::from(self.signer)
    }
}
