pub mod auth;

pub mod health;
pub use self::health::health;

pub mod user_signup;
pub use self::user_signup::signup;

pub mod user_signin;
pub use self::user_signin::signin;

pub mod user_info;
pub use self::user_info::info;
