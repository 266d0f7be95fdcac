//! Typed client for the MultitokenLoan contract.
//!
//! Reads decode fixed-point records into [`LoanRecord`]; writes run an
//! optimistic state pre-check and a gas estimate before submission so
//! invalid calls fail fast instead of as mined, reverted transactions.
//! All chain errors funnel through [`normalize_call_error`], giving every
//! caller the same failure taxonomy.

use std::{collections::HashSet, str::FromStr, sync::Mutex};

use alloy::{
    network::EthereumWallet,
    primitives::{Address, B256, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    sol,
};
use bigdecimal::BigDecimal;
use tracing::{info, warn};
use url::Url;

use crate::{
    error::Error,
    helpers::{
        decimal_to_wei, epoch_to_datetime, normalize_address, wei_to_decimal,
    },
    model::LoanRecord,
    types::UserRole,
};

sol! {
    #[sol(rpc)]
    contract MultitokenLoan {
        struct Loan {
            address borrower;
            address token;
            uint256 principal;
            uint256 interest;
            uint256 dueDate;
            bool funded;
            bool repaid;
            uint256 monthlyPayment;
            uint256 totalPaid;
            uint256 duration;
            string metadataCID;
        }

        function loanCounter() external view returns (uint256);
        function getLoan(uint256 id) external view returns (Loan memory);
        function isInvestor(address account) external view returns (bool);
        function getUserRole(address account) external view returns (string memory);

        function requestLoan(
            address token,
            uint256 principal,
            uint256 interest,
            uint256 durationMonths,
            string metadataCID
        ) external;
        function fundLoan(uint256 id) external payable;
        function makePayment(uint256 id) external payable;
        function registerAsBusiness() external;
        function registerAsInvestor() external;
    }
}

/// Native-token loans use the zero address in the token slot.
pub const NATIVE_TOKEN: Address = Address::ZERO;

pub struct ChainClient {
    contract: MultitokenLoan::MultitokenLoanInstance<DynProvider>,
    signer_address: Address,
    in_flight: Mutex<HashSet<u64>>,
}

impl std::fmt::Debug for ChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainClient")
            .field("contract", &self.contract.address())
            .field("signer", &self.signer_address)
            .finish()
    }
}

/// Releases the per-loan processing flag when the submission settles.
struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<u64>>,
    id: u64,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut set = self.set.lock().unwrap_or_else(|e| e.into_inner());
        set.remove(&self.id);
    }
}

impl ChainClient {
    pub fn new(
        rpc_host: &Url,
        signer_key: &str,
        contract_address: Address,
    ) -> Result<ChainClient, Error> {
        let signer = PrivateKeySigner::from_str(signer_key.trim())?;
        let signer_address = signer.address();
        let wallet = EthereumWallet::from(signer);

        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .connect_http(rpc_host.to_owned())
            .erased();

        Ok(ChainClient {
            contract: MultitokenLoan::new(contract_address, provider),
            signer_address,
            in_flight: Mutex::new(HashSet::new()),
        })
    }

    /// The wallet this service signs with.
    pub fn signer_address(&self) -> String {
        normalize_address(&self.signer_address)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn loan_counter(&self) -> Result<u64, Error> {
        let raw = self.contract.loanCounter().call().await?;
        u64::try_from(raw).map_err(|_| {
            Error::TaskError(String::from("Loan counter out of range"))
        })
    }

    pub async fn get_loan(&self, id: u64) -> Result<LoanRecord, Error> {
        let loan = self
            .contract
            .getLoan(U256::from(id))
            .call()
            .await
            .map_err(normalize_call_error)?;

        decode_loan(id, loan)
    }

    /// Sequential fetch of the whole book. A record that fails to decode
    /// is logged and skipped; one bad loan never hides the rest.
    pub async fn fetch_all_loans(&self) -> Result<Vec<LoanRecord>, Error> {
        let count = self.loan_counter().await?;
        info!(count, "fetching loan snapshot");

        let mut records = Vec::with_capacity(count as usize);
        for id in 0..count {
            match self.get_loan(id).await {
                Ok(record) => records.push(record),
                Err(e) => warn!(id, "skipping undecodable loan: {}", e),
            }
        }

        Ok(records)
    }

    pub async fn get_user_role(
        &self,
        address: Address,
    ) -> Result<UserRole, Error> {
        let raw = self.contract.getUserRole(address).call().await?;
        Ok(UserRole::parse(&raw))
    }

    pub async fn is_investor(&self, address: Address) -> Result<bool, Error> {
        Ok(self.contract.isInvestor(address).call().await?)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    pub async fn request_loan(
        &self,
        principal: &BigDecimal,
        interest_bps: u32,
        duration_months: u32,
        metadata_cid: String,
    ) -> Result<String, Error> {
        let call = self.contract.requestLoan(
            NATIVE_TOKEN,
            decimal_to_wei(principal)?,
            U256::from(interest_bps),
            U256::from(duration_months),
            metadata_cid,
        );

        call.estimate_gas().await.map_err(normalize_call_error)?;
        let pending = call.send().await.map_err(normalize_call_error)?;
        let hash = pending.watch().await?;

        info!(tx = %hash, "loan request submitted");
        Ok(tx_hash(hash))
    }

    /// Fund a pending loan with the full principal. Pre-checks follow the
    /// contract's own rules so the common rejections never cost gas; the
    /// check-then-submit race is resolved by the contract and surfaces as
    /// a normalized revert.
    pub async fn fund_loan(
        &self,
        id: u64,
        amount: &BigDecimal,
    ) -> Result<String, Error> {
        let _guard = self.try_begin(id)?;

        if !self.is_investor(self.signer_address).await? {
            return Err(Error::RoleRequired(
                self.signer_address(),
                UserRole::Investor.to_string(),
            ));
        }

        let loan = self.get_loan(id).await?;
        if loan.funded {
            return Err(Error::LoanState(String::from(
                "This loan is already fully funded",
            )));
        }
        if loan.repaid {
            return Err(Error::LoanState(String::from(
                "This loan has already been repaid",
            )));
        }

        let call = self
            .contract
            .fundLoan(U256::from(id))
            .value(decimal_to_wei(amount)?);

        call.estimate_gas().await.map_err(normalize_call_error)?;
        let pending = call.send().await.map_err(normalize_call_error)?;
        let hash = pending.watch().await?;

        info!(id, tx = %hash, "loan funded");
        Ok(tx_hash(hash))
    }

    /// Make a repayment installment (or payoff) on a funded loan.
    pub async fn make_payment(
        &self,
        id: u64,
        amount: &BigDecimal,
    ) -> Result<String, Error> {
        let _guard = self.try_begin(id)?;

        let loan = self.get_loan(id).await?;
        if loan.borrower != self.signer_address() {
            return Err(Error::NotBorrower(String::from(
                "You are not the borrower of this loan",
            )));
        }
        if !loan.funded {
            return Err(Error::LoanState(String::from(
                "This loan has not been funded yet",
            )));
        }
        if loan.repaid {
            return Err(Error::LoanState(String::from(
                "This loan has already been fully repaid",
            )));
        }

        let call = self
            .contract
            .makePayment(U256::from(id))
            .value(decimal_to_wei(amount)?);

        call.estimate_gas().await.map_err(normalize_call_error)?;
        let pending = call.send().await.map_err(normalize_call_error)?;
        let hash = pending.watch().await?;

        info!(id, tx = %hash, "payment submitted");
        Ok(tx_hash(hash))
    }

    /// One-time role registration. An address that already holds a
    /// concrete on-chain role is refused; the contract never gets asked
    /// to silently overwrite it.
    pub async fn register(&self, role: UserRole) -> Result<String, Error> {
        let current = self.get_user_role(self.signer_address).await?;
        if current.is_known() {
            return Err(Error::RoleAlreadyRegistered(
                self.signer_address(),
                current.to_string(),
            ));
        }

        let call = match role {
            UserRole::Business => {
                self.contract.registerAsBusiness().clear_decoder()
            },
            UserRole::Investor => {
                self.contract.registerAsInvestor().clear_decoder()
            },
            UserRole::Unknown => {
                return Err(Error::Validation(String::from(
                    "Role must be business or investor",
                )));
            },
        };

        call.estimate_gas().await.map_err(normalize_call_error)?;
        let pending = call.send().await.map_err(normalize_call_error)?;
        let hash = pending.watch().await?;

        info!(role = %role, tx = %hash, "role registered");
        Ok(tx_hash(hash))
    }

    fn try_begin(&self, id: u64) -> Result<InFlightGuard<'_>, Error> {
        let mut set =
            self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if !set.insert(id) {
            return Err(Error::LoanBusy(id));
        }
        Ok(InFlightGuard { set: &self.in_flight, id })
    }
}

fn tx_hash(hash: B256) -> String {
    format!("{:#x}", hash)
}

fn decode_loan(
    id: u64,
    loan: MultitokenLoan::Loan,
) -> Result<LoanRecord, Error> {
    let interest_bps = u32::try_from(loan.interest).map_err(|_| {
        Error::TaskError(format!("Loan {}: interest out of range", id))
    })?;

    let due_seconds = i64::try_from(loan.dueDate).unwrap_or_default();

    let monthly_payment = if loan.monthlyPayment.is_zero() {
        None
    } else {
        Some(wei_to_decimal(loan.monthlyPayment)?)
    };

    let duration_months = if loan.duration.is_zero() {
        None
    } else {
        Some(u32::try_from(loan.duration).map_err(|_| {
            Error::TaskError(format!("Loan {}: duration out of range", id))
        })?)
    };

    Ok(LoanRecord {
        id,
        borrower: normalize_address(&loan.borrower),
        token_address: normalize_address(&loan.token),
        principal: wei_to_decimal(loan.principal)?,
        interest_bps,
        due_date: epoch_to_datetime(due_seconds),
        funded: loan.funded,
        repaid: loan.repaid,
        monthly_payment,
        total_paid: wei_to_decimal(loan.totalPaid)?,
        duration_months,
        metadata_cid: loan.metadataCID,
    })
}

/// Map a raw contract/transport failure onto the marketplace taxonomy:
/// cancelled signature, insufficient balance, revert reason verbatim, or
/// the transport error as-is.
fn normalize_call_error(error: alloy::contract::Error) -> Error {
    match classify_failure(&error.to_string()) {
        Some(normalized) => normalized,
        None => Error::ContractError(error),
    }
}

fn classify_failure(message: &str) -> Option<Error> {
    let lowered = message.to_lowercase();

    if lowered.contains("user rejected") || lowered.contains("user denied") {
        return Some(Error::TransactionCancelled);
    }
    if lowered.contains("insufficient funds") {
        return Some(Error::InsufficientFunds);
    }
    if let Some(position) = message.find("execution reverted") {
        let reason = message[position..]
            .split_once(':')
            .map(|(_, reason)| reason.trim())
            .filter(|reason| !reason.is_empty())
            .unwrap_or("execution reverted");
        return Some(Error::ContractRevert(reason.to_owned()));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_loan(
        monthly_payment: u128,
        duration: u64,
    ) -> MultitokenLoan::Loan {
        MultitokenLoan::Loan {
            borrower: Address::repeat_byte(0xAB),
            token: NATIVE_TOKEN,
            principal: U256::from(10u128.pow(21)),
            interest: U256::from(1000u64),
            dueDate: U256::from(1_900_000_000u64),
            funded: true,
            repaid: false,
            monthlyPayment: U256::from(monthly_payment),
            totalPaid: U256::ZERO,
            duration: U256::from(duration),
            metadataCID: String::from("json:{}"),
        }
    }

    #[test]
    fn decodes_amounts_at_token_scale() {
        let record = decode_loan(3, raw_loan(0, 12)).unwrap();

        assert_eq!(record.id, 3);
        assert_eq!(record.principal, BigDecimal::from(1000));
        assert_eq!(record.interest_bps, 1000);
        assert_eq!(record.duration_months, Some(12));
        assert_eq!(record.total_paid, BigDecimal::from(0));
        assert!(record.borrower.starts_with("0xab"));
    }

    #[test]
    fn zero_fields_decode_as_absent() {
        let record = decode_loan(0, raw_loan(0, 0)).unwrap();
        assert_eq!(record.monthly_payment, None);
        assert_eq!(record.duration_months, None);
    }

    #[test]
    fn nonzero_monthly_payment_is_present() {
        let record =
            decode_loan(0, raw_loan(95_830_000_000_000_000_000, 12)).unwrap();
        assert_eq!(
            record.monthly_payment,
            Some(BigDecimal::from_str("95.83").unwrap())
        );
    }

    #[test]
    fn failure_messages_normalize_to_the_taxonomy() {
        assert!(matches!(
            classify_failure("error: user rejected the request"),
            Some(Error::TransactionCancelled)
        ));
        assert!(matches!(
            classify_failure("insufficient funds for gas * price + value"),
            Some(Error::InsufficientFunds)
        ));
        assert!(classify_failure("connection refused").is_none());
    }

    #[test]
    fn revert_reason_is_surfaced_verbatim() {
        let normalized = classify_failure(
            "server returned an error response: error code 3: \
             execution reverted: Loan already funded",
        );

        match normalized {
            Some(Error::ContractRevert(reason)) => {
                assert_eq!(reason, "Loan already funded")
            },
            other => panic!("unexpected normalization: {:?}", other),
        }
    }

    #[test]
    fn bare_revert_keeps_a_generic_reason() {
        match classify_failure("execution reverted") {
            Some(Error::ContractRevert(reason)) => {
                assert_eq!(reason, "execution reverted")
            },
            other => panic!("unexpected normalization: {:?}", other),
        }
    }
}
