// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Base RPC client for the ScoreChecker contract.

use alloy::{
    network::Ethereum,
    primitives::{Address, U256},
    providers::{
        fillers::{BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller},
        Identity, Provider, ProviderBuilder, RootProvider,
    },
    rpc::types::BlockNumberOrTag,
    sol,
};
use async_trait::async_trait;
use tracing::warn;

use super::types::*;

sol! {
    #[sol(rpc)]
    interface IScoreChecker {
        function nonces(address user) external view returns (uint256);
        function authorizedSigner() external view returns (address);
        function checkFee() external view returns (uint256);
        function minInterval() external view returns (uint256);
        function maxSigAge() external view returns (uint256);
        function getScore(address user) external view returns (uint256 score, uint256 timestamp);
        function getScoreCard(address user) external view returns (uint256[15] memory card);
    }
}

/// HTTP provider type for Base (with all fillers).
type HttpProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider<Ethereum>,
>;

/// ScoreChecker reader over JSON-RPC.
pub struct ScoreCheckerClient {
    chain_id: u64,
    contract: Option<Address>,
    provider: HttpProvider,
}

impl ScoreCheckerClient {
    pub fn new(
        rpc_url: &str,
        chain_id: u64,
        contract: Option<Address>,
    ) -> Result<Self, ChainError> {
        let url: url::Url = rpc_url
            .parse()
            .map_err(|e: url::ParseError| ChainError::InvalidRpcUrl(e.to_string()))?;
        let provider = ProviderBuilder::new().connect_http(url);
        Ok(Self {
            chain_id,
            contract,
            provider,
        })
    }

    fn instance(&self) -> Result<IScoreChecker::IScoreCheckerInstance<&HttpProvider>, ChainError> {
        let address = self.contract.ok_or(ChainError::ContractNotConfigured)?;
        Ok(IScoreChecker::new(address, &self.provider))
    }
}

fn contract_err(e: alloy::contract::Error) -> ChainError {
    ChainError::Contract(e.to_string())
}

#[async_trait]
impl ScoreChainReader for ScoreCheckerClient {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn contract(&self) -> Option<Address> {
        self.contract
    }

    async fn nonce(&self, user: Address) -> Result<U256, ChainError> {
        self.instance()?.nonces(user).call().await.map_err(contract_err)
    }

    async fn authorized_signer(&self) -> Result<Address, ChainError> {
        self.instance()?
            .authorizedSigner()
            .call()
            .await
            .map_err(contract_err)
    }

    async fn latest_block_timestamp(&self) -> Result<u64, ChainError> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?
            .ok_or_else(|| ChainError::Rpc("latest block not available".to_string()))?;
        Ok(block.header.timestamp)
    }

    async fn get_score(&self, user: Address) -> Result<OnchainScore, ChainError> {
        let result = self
            .instance()?
            .getScore(user)
            .call()
            .await
            .map_err(contract_err)?;
        Ok(OnchainScore {
            score: u64::try_from(result.score).unwrap_or(u64::MAX),
            timestamp: u64::try_from(result.timestamp).unwrap_or(u64::MAX),
        })
    }

    async fn get_score_card(&self, user: Address) -> Result<OnchainScoreCard, ChainError> {
        let words = self
            .instance()?
            .getScoreCard(user)
            .call()
            .await
            .map_err(contract_err)?;
        Ok(OnchainScoreCard::from(words))
    }

    async fn contract_params(&self) -> Result<ContractParams, ChainError> {
        let contract = self.instance()?;
        let authorized_signer = contract.authorizedSigner().call().await.unwrap_or_else(|e| {
            warn!(error = %e, "authorizedSigner read failed");
            Address::ZERO
        });
        let check_fee = contract.checkFee().call().await.unwrap_or_else(|e| {
            warn!(error = %e, "checkFee read failed");
            U256::ZERO
        });
        let min_interval = contract.minInterval().call().await.unwrap_or_else(|e| {
            warn!(error = %e, "minInterval read failed");
            U256::ZERO
        });
        let max_sig_age = contract.maxSigAge().call().await.unwrap_or_else(|e| {
            warn!(error = %e, "maxSigAge read failed");
            U256::ZERO
        });
        Ok(ContractParams {
            authorized_signer,
            check_fee,
            min_interval: u64::try_from(min_interval).unwrap_or(u64::MAX),
            max_sig_age: u64::try_from(max_sig_age).unwrap_or(u64::MAX),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_rpc_url() {
        assert!(matches!(
            ScoreCheckerClient::new("not a url", BASE_MAINNET_CHAIN_ID, None),
            Err(ChainError::InvalidRpcUrl(_))
        ));
    }

    #[tokio::test]
    async fn contract_reads_require_an_address() {
        let client =
            ScoreCheckerClient::new("http://127.0.0.1:1", BASE_MAINNET_CHAIN_ID, None).unwrap();
        assert!(matches!(
            client.nonce(Address::ZERO).await,
            Err(ChainError::ContractNotConfigured)
        ));
        assert!(matches!(
            client.get_score(Address::ZERO).await,
            Err(ChainError::ContractNotConfigured)
        ));
    }
}
