
pub use recording::*;

use crate::method::MethodId;

// Helper function to create an instance method on the shared test type
pub fn instance_method(name: &str) -> MethodId {
    MethodId::method("com.example.Target", name, "()I")
}
