// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Azure resource services.
//!
//! - [`managedclusters`] - the AKS managed cluster behind an `AzureManagedControlPlane`
//! - [`agentpools`] - one agent pool per `AzureManagedMachinePool`

pub mod agentpools;
pub mod managedclusters;
