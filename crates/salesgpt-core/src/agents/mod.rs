pub mod detect;
pub mod fallback;
pub mod intent;
pub mod observe;
pub mod remote;
pub mod rules;
