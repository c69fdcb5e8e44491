//! Wiring of store paths and host services for one invocation.

use fwg_core::{Host, Prompter, ServerLifecycle, StorePaths};
use fwg_system::{
    AssumeYes, IpForwarding, SystemNetworkProbe, SystemdControl, TerminalPrompter,
    WgToolKeyGenerator,
};

use crate::cli::Cli;

/// Real host services, built from the global options.
///
/// Construction touches neither the filesystem nor the network.
pub struct Services {
    paths: StorePaths,
    keys: WgToolKeyGenerator,
    network: SystemNetworkProbe,
    daemon: SystemdControl,
    prompter: Box<dyn Prompter>,
    forwarding: IpForwarding,
}

impl Services {
    /// Builds the services for `cli`.
    #[must_use]
    pub fn from_cli(cli: &Cli) -> Self {
        let mut paths = StorePaths::new(&cli.config_dir);
        if let Some(tracker) = &cli.tracker {
            paths = paths.with_tracker_path(tracker);
        }
        let prompter: Box<dyn Prompter> = if cli.yes {
            Box::new(AssumeYes)
        } else {
            Box::new(TerminalPrompter::new())
        };
        let network = SystemNetworkProbe::new(fwg_core::InterfaceTracker::new(paths.tracker_path()));

        Self {
            keys: WgToolKeyGenerator::new(paths.clone()),
            network,
            daemon: SystemdControl::new(),
            prompter,
            forwarding: IpForwarding::default(),
            paths,
        }
    }

    /// The operator prompter.
    #[must_use]
    pub fn prompter(&self) -> &dyn Prompter {
        self.prompter.as_ref()
    }

    /// IP forwarding configuration.
    #[must_use]
    pub fn forwarding(&self) -> &IpForwarding {
        &self.forwarding
    }

    /// Lifecycle orchestrator over these services.
    #[must_use]
    pub fn lifecycle(&self) -> ServerLifecycle<'_> {
        ServerLifecycle::new(
            self.paths.clone(),
            Host {
                keys: &self.keys,
                network: &self.network,
                daemon: &self.daemon,
                prompter: self.prompter.as_ref(),
            },
        )
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("paths", &self.paths)
            .field("forwarding", &self.forwarding)
            .finish_non_exhaustive()
    }
}
