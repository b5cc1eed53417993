use glam::IVec2;

/// Boxed error returned by a [`MapLoader`](crate::MapLoader).
pub type LoadError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error(transparent)]
    Common(#[from] scrollkit_common::Error),

    #[error("failed to load region {name:?} at {offset}")]
    Load {
        name: String,
        offset: IVec2,
        #[source]
        source: LoadError,
    },
}

pub type Result<T, E = StreamError> = std::result::Result<T, E>;
