//! Integration tests for eventdesk
//! These run the real reqwest transport against local mock servers

pub mod test_harness;

pub mod api_client_test;
pub mod dashboard_test;
pub mod session_flow_test;
