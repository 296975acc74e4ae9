pub mod database;
pub mod environment;
pub mod http;

pub use database::{
    DatabaseConnectionCheck, DefaultAdminCheck, DefaultPasswordCheck, MigrationLedgerCheck, SchemaCheck,
};
pub use environment::EnvironmentCheck;
pub use http::{
    BackendHealthCheck, CorsPolicyCheck, FrontendReachableCheck, LoginEndpointCheck, LoginRoundtripCheck,
    TargetUrlsCheck,
};
