//! Fixture identities and search rows shared by integration tests.

use roster_core::Identity;
use serde_json::{Value, json};

/// The user from the login scenario: `{id: 7, name: "Akash", permid: "p7"}`.
pub fn akash() -> Identity {
    Identity::new(7, "Akash", "p7")
}

/// A single search hit: `{id: 1, name: "Sam", age: 29, sex: "M"}`.
pub fn sam_row() -> Value {
    json!({ "id": 1, "name": "Sam", "age": 29, "sex": "M" })
}

/// A second, older search hit.
pub fn ana_row() -> Value {
    json!({ "id": 2, "name": "Ana", "age": 41, "sex": "F" })
}
