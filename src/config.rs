// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module contains the configuration options for the `Grid`.

/// Configuration options for the `Grid`.
#[derive(Clone, Default, Debug)]
pub struct GridConfig {
    /// A name for the grid, recorded as the `grid` field of every log event
    /// the grid emits.
    pub name: Option<String>,

    /// Whether to allow merging stores of kinds that have no registered
    /// foreign-key columns.  When this is `true`, such stores are merged after
    /// offsetting only their `id` column, instead of failing the merge.
    pub allow_unsupported_merge_kinds: bool,
}
