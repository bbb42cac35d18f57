//! Application service layer.
//!
//! Services contain business logic on top of the repositories: merging token
//! data categories with fallback substitution, and valuing portfolios.

mod portfolio_service;
mod token_service;

pub use portfolio_service::{PortfolioService, PortfolioServiceImpl};
pub use token_service::{TokenService, TokenServiceImpl};

// Re-export common types used by services
pub use crate::models::{CompleteTokenData, Holding, PortfolioValuation};
