// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module contains the capability traits that need to be implemented by
//! the types handed to a [GraphEngine][crate::GraphEngine] as branches.

use crate::Id;

/// Status value of a closed branch side.
pub(crate) const CLOSED: i8 = 1;

/// Implemented by anything that can be in or out of service.
pub trait HasStatus {
    /// Returns true if every side is closed.
    fn is_closed(&self) -> bool;
}

/**
This trait needs to be implemented by the type that represents a
two-terminal branch.

The graph engines only look at the two end nodes and whether the branch is
closed on both sides, so any row type of a branch-like store can be used.

<details>
<summary>Example implementation for a user type:</summary>

```
use power_grid_store::{HasFromTo, HasStatus, Id};

struct Cable {
    from: Id,
    to: Id,
    switched_on: bool,
}

impl HasStatus for Cable {
    fn is_closed(&self) -> bool {
        self.switched_on
    }
}

impl HasFromTo for Cable {
    fn from_node(&self) -> Id {
        self.from
    }

    fn to_node(&self) -> Id {
        self.to
    }
}
```

</details>
*/
pub trait HasFromTo: HasStatus {
    /// Returns the id of the node on the from-side.
    fn from_node(&self) -> Id;
    /// Returns the id of the node on the to-side.
    fn to_node(&self) -> Id;
}

/// This trait needs to be implemented by the type that represents a
/// three-terminal branch.  Each pair of terminals becomes one edge.
pub trait HasThreeTerminals {
    /// Returns the id of the branch itself.
    fn branch_id(&self) -> Id;
    /// Returns the ids of the three terminal nodes.
    fn terminals(&self) -> [Id; 3];
    /// Returns the status of each terminal.
    fn statuses(&self) -> [i8; 3];

    /// Decomposes the branch into its three two-terminal edges: (1,2), (1,3)
    /// and (2,3).
    fn as_branches(&self) -> [BranchEnds; 3] {
        let n = self.terminals();
        let s = self.statuses();
        let id = self.branch_id();
        [(0, 1), (0, 2), (1, 2)].map(|(a, b)| BranchEnds {
            id,
            from_node: n[a],
            to_node: n[b],
            from_status: s[a],
            to_status: s[b],
        })
    }
}

/// The end points and statuses of a two-terminal branch row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BranchEnds {
    pub id: Id,
    pub from_node: Id,
    pub to_node: Id,
    pub from_status: i8,
    pub to_status: i8,
}

impl HasStatus for BranchEnds {
    fn is_closed(&self) -> bool {
        self.from_status == CLOSED && self.to_status == CLOSED
    }
}

impl HasFromTo for BranchEnds {
    fn from_node(&self) -> Id {
        self.from_node
    }

    fn to_node(&self) -> Id {
        self.to_node
    }
}

/// The terminals and statuses of a three-terminal branch row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Branch3Ends {
    pub id: Id,
    pub nodes: [Id; 3],
    pub statuses: [i8; 3],
}

impl HasThreeTerminals for Branch3Ends {
    fn branch_id(&self) -> Id {
        self.id
    }

    fn terminals(&self) -> [Id; 3] {
        self.nodes
    }

    fn statuses(&self) -> [i8; 3] {
        self.statuses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decomposition() {
        let branch3 = Branch3Ends {
            id: 9,
            nodes: [1, 2, 3],
            statuses: [1, 0, 1],
        };
        let [a, b, c] = branch3.as_branches();
        assert_eq!((a.from_node, a.to_node, a.is_closed()), (1, 2, false));
        assert_eq!((b.from_node, b.to_node, b.is_closed()), (1, 3, true));
        assert_eq!((c.from_node, c.to_node, c.is_closed()), (2, 3, false));
        assert!([a, b, c].iter().all(|e| e.id == 9));
    }
}
