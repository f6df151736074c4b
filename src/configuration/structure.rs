pub use self::hub::Settings;
pub(super) use self::hub::UnresolvedHubConfiguration;

mod hub;
