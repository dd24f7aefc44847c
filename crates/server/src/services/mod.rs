//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Password login, TOTP two-factor, recovery codes, session records
//! - `contact` - Contact info and social link validation
//! - `email` - Transactional email via the AWS SES SMTP interface
//! - `embeds` - Spotify and YouTube URL parsing
//! - `merch` - Merch configuration and the public storefront
//! - `newsletter` - Signups, unsubscribes, admin list and CSV export
//! - `ses` - SES bounce/complaint notifications over SNS
//! - `shows` - Show validation and public listing
//! - `theme` - Theme validation and CSS variables
//! - `validation` - Shared field validation helpers

pub mod auth;
pub mod contact;
pub mod email;
pub mod embeds;
pub mod merch;
pub mod newsletter;
pub mod ses;
pub mod shows;
pub mod theme;
pub mod validation;

pub use auth::{AuthError, AuthService};
pub use email::{EmailError, EmailService};
pub use embeds::EmbedError;
pub use merch::MerchError;
pub use newsletter::NewsletterError;
pub use ses::SesWebhookError;
pub use validation::ValidationError;
