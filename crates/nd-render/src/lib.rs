pub mod hit;

pub use hit::{
    HitTolerance, connection_at, group_at, groups_in_rect, node_at, nodes_in_rect, port_at,
};
