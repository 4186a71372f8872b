//! Page Components

mod home;
mod qr;

pub use home::HomePage;
pub use qr::QrPage;
