//! Status enums for orders, deliveries and user roles.
//!
//! Statuses are persisted as the Portuguese labels the dashboard displays
//! (`TEXT` columns, not Postgres enums), so every enum here round-trips
//! through its label for both serde and sqlx.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a stored or submitted label is not a known status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} label: {label}")]
pub struct StatusParseError {
    /// Which status family was being parsed.
    pub kind: &'static str,
    /// The offending label.
    pub label: String,
}

/// Implements `Display`, `FromStr` and (with `postgres`) the sqlx text
/// encoding for a label-backed enum.
macro_rules! label_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $label:literal),+ $(,)? }) => {
        impl $name {
            /// Every variant, in lifecycle order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The label stored in the database and shown in the dashboard.
            #[must_use]
            pub const fn label(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.label())
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = StatusParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok(Self::$variant),)+
                    _ => Err(StatusParseError {
                        kind: $kind,
                        label: s.to_string(),
                    }),
                }
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <String as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <String as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let label = <&str as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(label.parse::<Self>()?)
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <&str as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.label(), buf)
            }
        }
    };
}

/// Order payment/lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Created by checkout, waiting for the payment gateway.
    #[default]
    #[serde(rename = "Aguardando Pagamento")]
    AwaitingPayment,
    /// Payment confirmed by the gateway.
    #[serde(rename = "Pago")]
    Paid,
    /// Delivered to the customer.
    #[serde(rename = "Finalizada")]
    Finished,
    /// Cancelled by the customer or replaced by a newer checkout.
    #[serde(rename = "Cancelada")]
    Cancelled,
}

label_enum!(OrderStatus, "order status", {
    AwaitingPayment => "Aguardando Pagamento",
    Paid => "Pago",
    Finished => "Finalizada",
    Cancelled => "Cancelada",
});

/// Delivery progress as reported by the courier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DeliveryStatus {
    #[default]
    #[serde(rename = "Pendente")]
    Pending,
    #[serde(rename = "Aguardando Coleta")]
    AwaitingPickup,
    #[serde(rename = "Em Rota")]
    Dispatched,
    #[serde(rename = "Entregue")]
    Delivered,
    #[serde(rename = "Tentativa de Entrega")]
    Attempted,
}

label_enum!(DeliveryStatus, "delivery status", {
    Pending => "Pendente",
    AwaitingPickup => "Aguardando Coleta",
    Dispatched => "Em Rota",
    Delivered => "Entregue",
    Attempted => "Tentativa de Entrega",
});

/// Role stored in `profiles.role`.
///
/// Only `adm` grants access to administrative handlers; any other value is
/// treated as a regular customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Full access to administrative handlers.
    Admin,
    /// Storefront customer.
    Customer,
}

impl UserRole {
    /// Label used in the `profiles.role` column for administrators.
    pub const ADMIN_LABEL: &'static str = "adm";

    /// Map a stored role label to a role.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        if label == Self::ADMIN_LABEL {
            Self::Admin
        } else {
            Self::Customer
        }
    }

    /// Whether this role may call administrative handlers.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "adm"),
            Self::Customer => write!(f, "customer"),
        }
    }
}
