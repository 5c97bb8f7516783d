// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 QXB Gateway Contributors

//! QXB token contract interactions.
//!
//! The gateway talks to exactly one deployed contract. Besides the standard
//! ERC-20 surface it exposes a daily reward mechanism and an on-chain resume
//! document.

use alloy::{
    primitives::{Address, U256},
    providers::Provider,
    sol,
};

use super::client::{with_retries, ChainError};

// Contract interface using alloy's sol! macro
sol! {
    #[sol(rpc)]
    interface IQxbToken {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
        function version() external view returns (string);
        function lastClaimDay(address user) external view returns (uint256);
        function canClaimDailyReward(address user) external view returns (bool canClaim, uint256 nextClaimDay);
        function claimDailyReward() external returns (bool success);
        function getResume() external view returns (string);
        function setResume(string resume) external;
    }
}

/// Daily reward eligibility as reported by the contract.
#[derive(Debug, Clone)]
pub struct RewardEligibility {
    /// Whether the address may claim today
    pub can_claim: bool,
    /// The next UTC day index on which a claim becomes possible
    pub next_claim_day: u64,
}

/// Wrapper around the fixed QXB contract instance.
pub struct QxbContract<P> {
    contract: IQxbToken::IQxbTokenInstance<P>,
    address: Address,
}

impl<P: Provider + Clone> QxbContract<P> {
    /// Bind the contract at the given address.
    pub fn new(provider: &P, address: Address) -> Self {
        let contract = IQxbToken::new(address, provider.clone());
        Self { contract, address }
    }

    /// The contract address this instance is bound to.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Get the token name.
    pub async fn name(&self) -> Result<String, ChainError> {
        let result = self
            .contract
            .name()
            .call()
            .await
            .map_err(|e| ChainError::Contract(e.to_string()))?;
        Ok(result.to_string())
    }

    /// Get the token symbol.
    pub async fn symbol(&self) -> Result<String, ChainError> {
        let result = self
            .contract
            .symbol()
            .call()
            .await
            .map_err(|e| ChainError::Contract(e.to_string()))?;
        Ok(result.to_string())
    }

    /// Get the token decimals.
    pub async fn decimals(&self) -> Result<u8, ChainError> {
        self.contract
            .decimals()
            .call()
            .await
            .map_err(|e| ChainError::Contract(e.to_string()))
    }

    /// Get the total supply in base units. Retries transient RPC failures.
    pub async fn total_supply(&self) -> Result<U256, ChainError> {
        with_retries(|| async {
            self.contract
                .totalSupply()
                .call()
                .await
                .map_err(|e| ChainError::Contract(e.to_string()))
        })
        .await
    }

    /// Get the balance of an address in base units. Retries transient RPC
    /// failures.
    pub async fn balance_of(&self, account: Address) -> Result<U256, ChainError> {
        with_retries(|| async {
            self.contract
                .balanceOf(account)
                .call()
                .await
                .map_err(|e| ChainError::Contract(e.to_string()))
        })
        .await
    }

    /// Get the contract version string. Not every deployment exposes this, so
    /// callers treat failure as "no version".
    pub async fn version(&self) -> Result<String, ChainError> {
        let result = self
            .contract
            .version()
            .call()
            .await
            .map_err(|e| ChainError::Contract(e.to_string()))?;
        Ok(result.to_string())
    }

    /// Get the on-chain resume document.
    pub async fn resume(&self) -> Result<String, ChainError> {
        let result = self
            .contract
            .getResume()
            .call()
            .await
            .map_err(|e| ChainError::Contract(e.to_string()))?;
        Ok(result.to_string())
    }

    /// Get the UTC day index of the last successful claim for an address.
    pub async fn last_claim_day(&self, user: Address) -> Result<u64, ChainError> {
        let day = self
            .contract
            .lastClaimDay(user)
            .call()
            .await
            .map_err(|e| ChainError::Contract(e.to_string()))?;
        Ok(u64::try_from(day).unwrap_or(u64::MAX))
    }

    /// Ask the contract whether an address may claim the daily reward.
    /// Retries transient RPC failures.
    pub async fn can_claim_daily_reward(
        &self,
        user: Address,
    ) -> Result<RewardEligibility, ChainError> {
        let result = with_retries(|| async {
            self.contract
                .canClaimDailyReward(user)
                .call()
                .await
                .map_err(|e| ChainError::Contract(e.to_string()))
        })
        .await?;

        Ok(RewardEligibility {
            can_claim: result.canClaim,
            next_claim_day: u64::try_from(result.nextClaimDay).unwrap_or(u64::MAX),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::sol_types::SolCall;
    use std::str::FromStr;

    #[test]
    fn transfer_calldata_has_erc20_selector() {
        let call = IQxbToken::transferCall {
            to: Address::from_str("0x2222222222222222222222222222222222222222").unwrap(),
            amount: U256::from(1000u64),
        };
        let data = call.abi_encode();
        // Standard ERC-20 transfer(address,uint256) selector
        assert_eq!(&data[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(data.len(), 4 + 32 + 32);
    }

    #[test]
    fn claim_calldata_is_selector_only() {
        let data = IQxbToken::claimDailyRewardCall {}.abi_encode();
        assert_eq!(data.len(), 4);
    }

    #[test]
    fn set_resume_calldata_roundtrips() {
        let call = IQxbToken::setResumeCall {
            resume: "# Resume\nhello".to_string(),
        };
        let data = call.abi_encode();
        let decoded = IQxbToken::setResumeCall::abi_decode(&data).unwrap();
        assert_eq!(decoded.resume, "# Resume\nhello");
    }
}
