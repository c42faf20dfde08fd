//! End-to-end flows across auth, stream authentication, and the hub.

mod flow_test;
mod helpers;
