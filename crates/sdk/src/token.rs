use std::{fmt::Display, path::PathBuf};

use alloy::{
    network::TransactionBuilder,
    primitives::{Address, TxHash, U256},
    providers::Provider,
    rpc::types::{TransactionReceipt, TransactionRequest},
};
use alloy_sol_types::SolConstructor;
use tracing::{debug, info};

use crate::{
    abi::DummyERC20Token::{self, DummyERC20TokenInstance},
    artifact::TokenArtifact,
    error::OrderError,
    provider::{RECEIPT_MAX_POLLS, RECEIPT_POLL_INTERVAL},
};

/// Decimals of dummy tokens.
pub const DUMMY_TOKEN_DECIMALS: u64 = 18;

/// Initial supply of dummy tokens in base units: one whole token.
pub const DUMMY_TOKEN_TOTAL_SUPPLY: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Side of the order a token is provisioned for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenRole {
    Maker,
    Taker,
}

impl TokenRole {
    /// Name of the dummy token deployed for the role.
    pub fn token_name(&self) -> &'static str {
        match self {
            TokenRole::Maker => "MAKER_TOKEN",
            TokenRole::Taker => "TAKER_TOKEN",
        }
    }

    /// Symbol of the dummy token deployed for the role.
    pub fn token_symbol(&self) -> &'static str {
        match self {
            TokenRole::Maker => "MT",
            TokenRole::Taker => "TT",
        }
    }
}

impl Display for TokenRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenRole::Maker => write!(f, "maker"),
            TokenRole::Taker => write!(f, "taker"),
        }
    }
}

/// Parameters of a single token deployment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenDeployment {
    pub name: String,
    pub symbol: String,
    pub decimals: U256,
    pub total_supply: U256,
    /// Account sending the deployment transaction.
    pub from: Address,
}

impl TokenDeployment {
    /// Dummy token with the role's name and symbol.
    pub fn dummy(role: TokenRole, from: Address) -> Self {
        Self {
            name: role.token_name().to_string(),
            symbol: role.token_symbol().to_string(),
            decimals: U256::from(DUMMY_TOKEN_DECIMALS),
            total_supply: DUMMY_TOKEN_TOTAL_SUPPLY,
            from,
        }
    }

    /// Abi-encoded `DummyERC20Token` constructor arguments.
    pub fn constructor_args(&self) -> Vec<u8> {
        DummyERC20Token::constructorCall {
            _name: self.name.clone(),
            _symbol: self.symbol.clone(),
            _decimals: self.decimals,
            _totalSupply: self.total_supply,
        }
        .abi_encode()
    }
}

/// Deploys token contracts.
pub trait TokenDeployer {
    /// Deploys the token and waits until the deployment is mined, returning
    /// the contract address.
    fn deploy(
        &self,
        deployment: &TokenDeployment,
    ) -> impl Future<Output = Result<Address, OrderError>> + Send;
}

/// Deploys `DummyERC20Token` from a compiled artifact through the provider.
///
/// The artifact is read on each deployment, so runs that only reuse existing
/// tokens never need it.
#[derive(Clone, Debug)]
pub struct RpcTokenDeployer<P> {
    provider: P,
    artifact_path: PathBuf,
}

impl<P: Provider> RpcTokenDeployer<P> {
    pub fn new(provider: P, artifact_path: impl Into<PathBuf>) -> Self {
        Self { provider, artifact_path: artifact_path.into() }
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TransactionReceipt, OrderError> {
        for attempt in 1..=RECEIPT_MAX_POLLS {
            if let Some(receipt) = self.provider.get_transaction_receipt(tx_hash).await? {
                return Ok(receipt);
            }
            debug!(%tx_hash, attempt, "receipt not available yet");
            tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
        }
        Err(OrderError::Deployment(format!(
            "transaction {} not mined after {} polls",
            tx_hash, RECEIPT_MAX_POLLS
        )))
    }
}

impl<P: Provider> TokenDeployer for RpcTokenDeployer<P> {
    async fn deploy(&self, deployment: &TokenDeployment) -> Result<Address, OrderError> {
        let artifact = TokenArtifact::load(&self.artifact_path)?;
        let tx = TransactionRequest::default()
            .with_from(deployment.from)
            .with_deploy_code(artifact.deploy_code(&deployment.constructor_args()));

        let tx_hash = *self.provider.send_transaction(tx).await?.tx_hash();
        debug!(%tx_hash, name = %deployment.name, "deployment sent");

        let receipt = self.wait_for_receipt(tx_hash).await?;
        if !receipt.status() {
            return Err(OrderError::Deployment(format!(
                "{} deployment transaction {} reverted",
                deployment.name, receipt.transaction_hash
            )));
        }
        receipt.contract_address.ok_or_else(|| {
            OrderError::Deployment(format!(
                "receipt of {} has no contract address",
                receipt.transaction_hash
            ))
        })
    }
}

/// On-chain metadata of a token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenInfo {
    pub name: String,
    pub symbol: String,
    pub decimals: U256,
    pub total_supply: U256,
}

/// Token contract bound to a provider.
#[derive(Clone)]
pub struct TokenHandle<P> {
    role: TokenRole,
    deployed: bool,
    contract: DummyERC20TokenInstance<P>,
}

impl<P: Provider> TokenHandle<P> {
    /// Binds to an existing contract without touching the network.
    pub fn at(role: TokenRole, address: Address, provider: P) -> Self {
        Self { role, deployed: false, contract: DummyERC20Token::new(address, provider) }
    }

    pub fn role(&self) -> TokenRole { self.role }

    pub fn address(&self) -> Address { *self.contract.address() }

    /// Whether the contract was deployed by this run.
    pub fn is_deployed(&self) -> bool { self.deployed }

    /// Reads name, symbol, decimals and supply from the contract.
    pub async fn describe(&self) -> Result<TokenInfo, OrderError> {
        Ok(TokenInfo {
            name: self.contract.name().call().await?,
            symbol: self.contract.symbol().call().await?,
            decimals: self.contract.decimals().call().await?,
            total_supply: self.contract.totalSupply().call().await?,
        })
    }
}

impl<P: Provider> std::fmt::Debug for TokenHandle<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenHandle")
            .field("role", &self.role)
            .field("deployed", &self.deployed)
            .field("address", self.contract.address())
            .finish()
    }
}

/// Binds to supplied token contracts or deploys fresh dummy tokens.
#[derive(Clone, Debug)]
pub struct TokenProvisioner<P, D> {
    provider: P,
    deployer: D,
    from: Address,
}

impl<P: Provider + Clone, D: TokenDeployer> TokenProvisioner<P, D> {
    /// Provisioner deploying from the `from` account.
    pub fn new(provider: P, deployer: D, from: Address) -> Self {
        Self { provider, deployer, from }
    }

    /// Token handle for the role: bound to `supplied` if set, otherwise to a
    /// newly deployed dummy token.
    pub async fn provision(
        &self,
        role: TokenRole,
        supplied: Option<Address>,
    ) -> Result<TokenHandle<P>, OrderError> {
        if let Some(address) = supplied {
            info!(%role, %address, "using existing token");
            return Ok(TokenHandle::at(role, address, self.provider.clone()));
        }

        let deployment = TokenDeployment::dummy(role, self.from);
        info!(%role, name = %deployment.name, symbol = %deployment.symbol, from = %self.from, "deploying token");
        let address = self.deployer.deploy(&deployment).await?;
        info!(%role, %address, "token deployed");

        let mut handle = TokenHandle::at(role, address, self.provider.clone());
        handle.deployed = true;
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use alloy::{
        primitives::{B256, Bytes},
        providers::{ProviderBuilder, mock::Asserter},
    };
    use alloy_sol_types::SolCall;
    use serde_json::json;

    use super::*;

    /// Records deployments and hands out sequential addresses.
    #[derive(Default)]
    struct RecordingDeployer {
        deployments: Mutex<Vec<TokenDeployment>>,
        fail: bool,
    }

    impl RecordingDeployer {
        fn deployments(&self) -> Vec<TokenDeployment> { self.deployments.lock().unwrap().clone() }
    }

    impl TokenDeployer for &RecordingDeployer {
        async fn deploy(&self, deployment: &TokenDeployment) -> Result<Address, OrderError> {
            if self.fail {
                return Err(OrderError::Deployment("insufficient funds".to_string()));
            }
            let mut deployments = self.deployments.lock().unwrap();
            deployments.push(deployment.clone());
            Ok(Address::repeat_byte(0xd0 + deployments.len() as u8))
        }
    }

    fn mocked_provider() -> impl Provider + Clone {
        ProviderBuilder::new().connect_mocked_client(Asserter::new())
    }

    const FROM: Address = Address::repeat_byte(0x54);
    const TX_HASH: B256 = B256::repeat_byte(0xaa);

    /// Provider without fillers, so each RPC call maps to one queued response.
    fn bare_provider(asserter: &Asserter) -> impl Provider + Clone {
        ProviderBuilder::new().disable_recommended_fillers().connect_mocked_client(asserter.clone())
    }

    fn artifact_file(name: &str) -> PathBuf {
        let path =
            std::env::temp_dir().join(format!("dex-order-{}-{}.json", name, std::process::id()));
        std::fs::write(&path, r#"{ "bytecode": "0x6080604052" }"#).unwrap();
        path
    }

    fn receipt(status: bool, contract_address: Option<Address>) -> serde_json::Value {
        json!({
            "type": "0x0",
            "status": if status { "0x1" } else { "0x0" },
            "cumulativeGasUsed": "0x10000",
            "logs": [],
            "logsBloom": format!("0x{}", "00".repeat(256)),
            "transactionHash": TX_HASH,
            "transactionIndex": "0x0",
            "blockHash": B256::repeat_byte(0xbb),
            "blockNumber": "0x1",
            "gasUsed": "0x10000",
            "effectiveGasPrice": "0x1",
            "from": FROM,
            "to": null,
            "contractAddress": contract_address,
        })
    }

    #[tokio::test]
    async fn supplied_addresses_are_not_deployed() {
        let deployer = RecordingDeployer::default();
        let provisioner = TokenProvisioner::new(mocked_provider(), &deployer, FROM);

        let maker_address = Address::repeat_byte(0x11);
        let taker_address = Address::repeat_byte(0x22);
        let maker = provisioner.provision(TokenRole::Maker, Some(maker_address)).await.unwrap();
        let taker = provisioner.provision(TokenRole::Taker, Some(taker_address)).await.unwrap();

        assert!(deployer.deployments().is_empty());
        assert_eq!(maker.address(), maker_address);
        assert_eq!(taker.address(), taker_address);
        assert!(!maker.is_deployed());
        assert_eq!(taker.role(), TokenRole::Taker);
    }

    #[tokio::test]
    async fn missing_addresses_are_deployed_once_per_role() {
        let deployer = RecordingDeployer::default();
        let provisioner = TokenProvisioner::new(mocked_provider(), &deployer, FROM);

        let maker = provisioner.provision(TokenRole::Maker, None).await.unwrap();
        let taker = provisioner.provision(TokenRole::Taker, None).await.unwrap();

        let deployments = deployer.deployments();
        assert_eq!(deployments.len(), 2);
        assert_eq!(maker.address(), Address::repeat_byte(0xd1));
        assert_eq!(taker.address(), Address::repeat_byte(0xd2));
        assert!(maker.is_deployed() && taker.is_deployed());

        assert_eq!(deployments[0].name, "MAKER_TOKEN");
        assert_eq!(deployments[0].symbol, "MT");
        assert_eq!(deployments[1].name, "TAKER_TOKEN");
        assert_eq!(deployments[1].symbol, "TT");
        for deployment in &deployments {
            assert_eq!(deployment.from, FROM);
            assert_eq!(deployment.decimals, U256::from(18));
            assert_eq!(deployment.total_supply, U256::from(10u64.pow(18)));
        }
    }

    #[tokio::test]
    async fn only_missing_role_is_deployed() {
        let deployer = RecordingDeployer::default();
        let provisioner = TokenProvisioner::new(mocked_provider(), &deployer, FROM);

        provisioner.provision(TokenRole::Maker, Some(Address::repeat_byte(0x11))).await.unwrap();
        provisioner.provision(TokenRole::Taker, None).await.unwrap();

        let deployments = deployer.deployments();
        assert_eq!(deployments.len(), 1);
        assert_eq!(deployments[0].symbol, "TT");
    }

    #[tokio::test]
    async fn deployment_failure_propagates() {
        let deployer = RecordingDeployer { fail: true, ..Default::default() };
        let provisioner = TokenProvisioner::new(mocked_provider(), &deployer, FROM);

        let err = provisioner.provision(TokenRole::Maker, None).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Deployment);
    }

    #[tokio::test]
    async fn rpc_deployer_needs_artifact() {
        let deployer = RpcTokenDeployer::new(mocked_provider(), "/nonexistent/artifact.json");
        let err = deployer.deploy(&TokenDeployment::dummy(TokenRole::Maker, FROM)).await;
        assert!(matches!(err, Err(OrderError::ArtifactRead { .. })));
    }

    #[tokio::test]
    async fn rpc_deployer_binds_handle_to_deployed_address() {
        let deployed = Address::repeat_byte(0xc0);
        let asserter = Asserter::new();
        asserter.push_success(&TX_HASH);
        asserter.push_success(&receipt(true, Some(deployed)));
        let provider = bare_provider(&asserter);
        let path = artifact_file("deployed");

        let provisioner = TokenProvisioner::new(
            provider.clone(),
            RpcTokenDeployer::new(provider, &path),
            FROM,
        );
        let handle = provisioner.provision(TokenRole::Maker, None).await;
        std::fs::remove_file(&path).unwrap();

        let handle = handle.unwrap();
        assert_eq!(handle.address(), deployed);
        assert!(handle.is_deployed());
    }

    #[tokio::test]
    async fn rpc_deployer_polls_until_mined() {
        let deployed = Address::repeat_byte(0xc1);
        let asserter = Asserter::new();
        asserter.push_success(&TX_HASH);
        asserter.push_success(&serde_json::Value::Null);
        asserter.push_success(&receipt(true, Some(deployed)));
        let path = artifact_file("pending");

        let result = RpcTokenDeployer::new(bare_provider(&asserter), &path)
            .deploy(&TokenDeployment::dummy(TokenRole::Taker, FROM))
            .await;
        std::fs::remove_file(&path).unwrap();

        assert_eq!(result.unwrap(), deployed);
    }

    #[tokio::test]
    async fn rpc_deployer_rejects_reverted_deployment() {
        let asserter = Asserter::new();
        asserter.push_success(&TX_HASH);
        asserter.push_success(&receipt(false, Some(Address::repeat_byte(0xc2))));
        let path = artifact_file("reverted");

        let result = RpcTokenDeployer::new(bare_provider(&asserter), &path)
            .deploy(&TokenDeployment::dummy(TokenRole::Maker, FROM))
            .await;
        std::fs::remove_file(&path).unwrap();

        let err = result.unwrap_err();
        assert!(matches!(&err, OrderError::Deployment(msg) if msg.contains("reverted")));
        assert_eq!(err.kind(), crate::error::ErrorKind::Deployment);
    }

    #[tokio::test]
    async fn rpc_deployer_needs_contract_address() {
        let asserter = Asserter::new();
        asserter.push_success(&TX_HASH);
        asserter.push_success(&receipt(true, None));
        let path = artifact_file("no-address");

        let result = RpcTokenDeployer::new(bare_provider(&asserter), &path)
            .deploy(&TokenDeployment::dummy(TokenRole::Maker, FROM))
            .await;
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(
            result,
            Err(OrderError::Deployment(msg)) if msg.contains("no contract address")
        ));
    }

    #[tokio::test]
    async fn describe_reads_token_metadata() {
        let asserter = Asserter::new();
        asserter.push_success(&Bytes::from(DummyERC20Token::nameCall::abi_encode_returns(
            &"MAKER_TOKEN".to_string(),
        )));
        asserter.push_success(&Bytes::from(DummyERC20Token::symbolCall::abi_encode_returns(
            &"MT".to_string(),
        )));
        asserter.push_success(&Bytes::from(DummyERC20Token::decimalsCall::abi_encode_returns(
            &U256::from(DUMMY_TOKEN_DECIMALS),
        )));
        asserter.push_success(&Bytes::from(DummyERC20Token::totalSupplyCall::abi_encode_returns(
            &DUMMY_TOKEN_TOTAL_SUPPLY,
        )));

        let handle =
            TokenHandle::at(TokenRole::Maker, Address::repeat_byte(0x11), bare_provider(&asserter));
        let info = handle.describe().await.unwrap();

        assert_eq!(
            info,
            TokenInfo {
                name: "MAKER_TOKEN".to_string(),
                symbol: "MT".to_string(),
                decimals: U256::from(18),
                total_supply: DUMMY_TOKEN_TOTAL_SUPPLY,
            }
        );
        assert!(format!("{handle:?}").contains("Maker"));
    }

    #[test]
    fn constructor_args_layout() {
        let args = TokenDeployment::dummy(TokenRole::Maker, FROM).constructor_args();
        // two string offsets, decimals, supply, then two (length, data) tails
        assert_eq!(args.len(), 32 * 8);
        assert_eq!(U256::from_be_slice(&args[64..96]), U256::from(18));
        assert_eq!(U256::from_be_slice(&args[96..128]), DUMMY_TOKEN_TOTAL_SUPPLY);
    }
}
