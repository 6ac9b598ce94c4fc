use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum ContractError {
    // Initialization errors
    NotInitialized = 1,
    AlreadyInitialized = 2,
    Unauthorized = 3,

    // Loan state errors
    LoanNotFound = 4,
    NotActive = 5,
    ZeroDeposit = 6,
    InvalidAmount = 7,

    // Slippage and pricing errors
    SlippageTooLow = 8,
    PriceDeviationTooHigh = 9,
    InvalidPrice = 10,
    InvalidStrike = 11,

    // Swap errors
    UnsupportedSwapper = 12,
    SwapOutputTooLow = 13,
    SwapBalanceMismatch = 14,

    // Position errors
    NotYetSettleable = 15,
    PositionSettled = 16,

    // Roll errors
    InvalidRollOffer = 17,
    TransferMismatch = 18,
    BalanceInvariantViolated = 19,
    RepaymentExceedsLoan = 20,

    // Math errors
    MathOverflow = 21,
}
