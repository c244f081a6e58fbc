//! Utility macros for reducing boilerplate

/// Implement `FromRef<AppState>` for a cloneable field, so handlers can take
/// `State<T>` for just the part of the state they use.
///
/// # Example
/// ```ignore
/// impl_from_ref!(Arc<PayloadSigner>, signer);
/// // Expands to:
/// impl axum::extract::FromRef<AppState> for Arc<PayloadSigner> {
///     fn from_ref(state: &AppState) -> Self {
///         state.signer.clone()
///     }
/// }
/// ```
#[macro_export]
macro_rules! impl_from_ref {
    ($type:ty, $field:ident) => {
        impl axum::extract::FromRef<$crate::state::AppState> for $type {
            fn from_ref(state: &$crate::state::AppState) -> Self {
                state.$field.clone()
            }
        }
    };
}
