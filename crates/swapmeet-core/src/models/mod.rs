//! Wire models for the swapmeet REST API.
//!
//! These types mirror what the backend serializes. Business rules (trust
//! scores, match scores, swap state transitions) live on the server; the
//! client only carries and displays the results.
//!
//! - `User`, `Notification`: accounts and trust display
//! - `Product`, `ProductDetail`, `Category`: listings
//! - `SwapRequest`, `CounterOffer`, `Bid`: offers
//! - `Conversation`, `Message`: messaging
//! - `Review`, match results

pub mod matching;
pub mod message;
pub mod product;
pub mod review;
pub mod swap;
pub mod user;

pub use matching::{Compatibility, ProductMatch, ProductMatches, SuggestedMatch, SuggestedMatches};
pub use message::{Conversation, Message, NewMessage, UnreadCount};
pub use product::{
    Category, Product, ProductDetail, ProductDraft, ProductImage, ProductPatch, ProductQuery,
    Upload,
};
pub use review::{NewReview, Review};
pub use swap::{Bid, CounterOffer, NewBid, NewCounterOffer, NewSwap, SwapRequest};
pub use user::{
    Avatar, LoginRequest, Notification, ProfileUpdate, Registration, RegistrationResponse,
    TokenPair, User,
};
