//!
//! The named launch registry.
//!

use std::sync::Arc;

use crate::descriptor::password::Password;
use crate::error::Error;
use crate::runner::launch::Launch;
use crate::runner::output::Chunk;
use crate::runner::result::LaunchResult;
use crate::runner::Runner;
use crate::store::Store;

///
/// The named launch registry.
///
/// Loads a stored descriptor and runs it. Errors from either side are passed through as is.
///
#[derive(Debug, Clone)]
pub struct Registry {
    /// The descriptor store.
    store: Arc<Store>,
    /// The process runner.
    runner: Runner,
}

impl Registry {
    ///
    /// A shortcut constructor.
    ///
    pub fn new(store: Arc<Store>, runner: Runner) -> Self {
        Self { store, runner }
    }

    pub fn store(&self) -> &Store {
        self.store.as_ref()
    }

    ///
    /// Spawns the descriptor stored under `name`.
    ///
    /// The `password`, if provided, replaces the stored one.
    ///
    pub fn spawn_by_name(&self, name: &str, password: Option<Password>) -> Result<Launch, Error> {
        let mut descriptor = self.store.load(name)?;
        if let Some(password) = password {
            descriptor = descriptor.with_password(password);
        }
        self.runner.spawn(&descriptor)
    }

    ///
    /// Runs the descriptor stored under `name` to completion.
    ///
    pub fn run_by_name<F>(
        &self,
        name: &str,
        password: Option<Password>,
        sink: F,
    ) -> Result<LaunchResult, Error>
    where
        F: FnMut(&Chunk),
    {
        self.spawn_by_name(name, password)?.wait(sink)
    }
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use std::sync::Arc;

    use crate::descriptor::password::Password;
    use crate::descriptor::Descriptor;
    use crate::error::Error;
    use crate::runner::config::Config as RunnerConfig;
    use crate::runner::result::Status;
    use crate::runner::Runner;
    use crate::store::Store;

    use super::Registry;

    fn registry() -> Registry {
        Registry::new(Arc::new(Store::in_memory()), Runner::new(RunnerConfig::new("echo")))
    }

    #[test]
    fn run_by_name() {
        let wallet = tempfile::NamedTempFile::new().expect("Temporary wallet creation failed");
        let registry = registry();
        registry
            .store()
            .save(
                "deploy",
                Descriptor::new("Foo", "bar", wallet.path(), Password::new("p")),
            )
            .expect("Save failed");

        let result = registry
            .run_by_name("deploy", None, |_| {})
            .expect("Launch failed");

        assert_eq!(result.status, Status::Completed);
        assert_eq!(
            String::from_utf8_lossy(result.stdout.as_slice()),
            format!("Foo bar {} p\n", wallet.path().display())
        );
    }

    #[test]
    fn run_by_name_password_override() {
        let wallet = tempfile::NamedTempFile::new().expect("Temporary wallet creation failed");
        let registry = registry();
        registry
            .store()
            .save(
                "deploy",
                Descriptor::new("Foo", "bar", wallet.path(), Password::default()),
            )
            .expect("Save failed");

        let result = registry
            .run_by_name("deploy", Some(Password::new("secret")), |_| {})
            .expect("Launch failed");

        assert!(String::from_utf8_lossy(result.stdout.as_slice()).ends_with(" secret\n"));
    }

    #[test]
    fn not_found() {
        let error = registry()
            .run_by_name("missing", None, |_| {})
            .expect_err("Nothing is stored");
        assert!(matches!(error, Error::NotFound(name) if name == "missing"));
    }

    #[test]
    fn invalid_descriptor() {
        let registry = registry();
        registry
            .store()
            .save("broken", Descriptor::new("", "bar", "/tmp/w", Password::default()))
            .expect("Save failed");

        let error = registry
            .run_by_name("broken", None, |_| {})
            .expect_err("The descriptor is invalid");
        assert!(matches!(error, Error::InvalidDescriptor(_)));
    }
}
