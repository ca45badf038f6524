pub mod docs_auth;
