//! Bus and zonal balance, and the market value of device offers.

pub mod bus;
pub mod offers;
pub mod reserve;

pub use bus::{BalanceReport, BusInjections};
pub use offers::{evaluate_offers, OfferCosts, ReserveOfferCosts};
pub use reserve::{evaluate_reserves, ReserveBalance, ReserveShortfall, ZoneIncidence};
