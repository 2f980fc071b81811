mod order;
mod receipt;
mod reply;
mod request;

pub use alloy::primitives::TxHash;
pub use order::*;
pub use receipt::*;
pub use reply::*;
pub use request::*;

use crate::error::QueryError;

/// Block height of the ledger.
pub type Height = i64;

/// Owner address, in the ledger's own textual encoding.
pub type Address = String;

/// Direction of an index scan.
///
/// On the wire the direction is `0` (ascending) or `1` (descending), any other
/// value is rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

impl Direction {
    /// The opposite direction.
    pub fn inverted(&self) -> Self {
        match self {
            Direction::Ascending => Direction::Descending,
            Direction::Descending => Direction::Ascending,
        }
    }
}

impl TryFrom<i32> for Direction {
    type Error = QueryError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Direction::Ascending),
            1 => Ok(Direction::Descending),
            _ => Err(QueryError::InvalidParam(format!("direction {value}"))),
        }
    }
}

impl From<Direction> for i32 {
    fn from(value: Direction) -> Self {
        match value {
            Direction::Ascending => 0,
            Direction::Descending => 1,
        }
    }
}

/// Status of a trade order.
///
/// Receipts carry the status by name, materialized orders and replies by code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    OnSale,
    SoldOut,
    Revoked,
    Expired,
    OnBuy,
    BoughtOut,
    BuyRevoked,
    SellHalfRevoked,
    BuyHalfRevoked,
    GroupComplete,
}

impl OrderStatus {
    const ALL: [OrderStatus; 10] = [
        OrderStatus::OnSale,
        OrderStatus::SoldOut,
        OrderStatus::Revoked,
        OrderStatus::Expired,
        OrderStatus::OnBuy,
        OrderStatus::BoughtOut,
        OrderStatus::BuyRevoked,
        OrderStatus::SellHalfRevoked,
        OrderStatus::BuyHalfRevoked,
        OrderStatus::GroupComplete,
    ];

    pub fn code(&self) -> i32 {
        match self {
            OrderStatus::OnSale => 1,
            OrderStatus::SoldOut => 2,
            OrderStatus::Revoked => 3,
            OrderStatus::Expired => 4,
            OrderStatus::OnBuy => 5,
            OrderStatus::BoughtOut => 6,
            OrderStatus::BuyRevoked => 7,
            OrderStatus::SellHalfRevoked => 8,
            OrderStatus::BuyHalfRevoked => 9,
            OrderStatus::GroupComplete => 10,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OrderStatus::OnSale => "onsale",
            OrderStatus::SoldOut => "soldout",
            OrderStatus::Revoked => "revoked",
            OrderStatus::Expired => "expired",
            OrderStatus::OnBuy => "onbuy",
            OrderStatus::BoughtOut => "boughtout",
            OrderStatus::BuyRevoked => "buyrevoked",
            OrderStatus::SellHalfRevoked => "sellhalfrevoked",
            OrderStatus::BuyHalfRevoked => "buyhalfrevoked",
            OrderStatus::GroupComplete => "groupcomplete",
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    /// Status code of a receipt status name, `0` for unknown names.
    pub fn code_of(name: &str) -> i32 {
        Self::from_name(name).map_or(0, |s| s.code())
    }
}
