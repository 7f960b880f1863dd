use uuid::Uuid;

pub mod product;

// Re-exports for convenience
pub use product::*;

/// Generate an opaque record identifier (uuid v4, simple form).
pub fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()
}
