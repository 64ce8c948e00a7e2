pub mod aster;
pub mod hyperliquid;
pub mod kraken;
pub mod mexc;
