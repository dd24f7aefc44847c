//! Domain models for the bandsite server.
//!
//! These types are the validated, tenant-scoped records handlers and
//! services pass around. Database row types stay private to `crate::db`.

pub mod admin_user;
pub mod contact;
pub mod merch;
pub mod player;
pub mod session;
pub mod show;
pub mod subscriber;
pub mod tenant;
pub mod theme;

pub use admin_user::{AdminProfile, AdminSessionRecord, AdminUser, TenantSummary};
pub use contact::{ContactInfo, ContactInput};
pub use merch::{
    MerchConfig, MerchConfigInput, MerchConfigView, MerchProduct, MerchStorefront,
    STRIPE_BUY_BUTTON_SCRIPT,
};
pub use player::{PlayerInput, ReorderInput, SpotifyPlayer, Video, VideoInput};
pub use session::{CurrentAdmin, PendingLogin, PendingTotpSetup, session_keys};
pub use show::{
    BANDSINTOWN_WIDGET_SCRIPT, BandsintownWidget, PublicShows, Show, ShowInput, ShowSettings,
    ShowSettingsInput,
};
pub use subscriber::{SignupInput, Subscriber, SubscriberPage};
pub use tenant::{CurrentTenant, Tenant};
pub use theme::{Theme, ThemeInput};
