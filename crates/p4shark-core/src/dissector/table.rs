use crate::dependency::Dependency;

pub const IP_PROTO_TABLE: &str = "ip.proto";
pub const TCP_PORT_TABLE: &str = "tcp.port";

/// How the well-known dissector tables are picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverridePolicy {
    /// Register on `ip.proto` when the predecessor is `ipv4` or the branch
    /// field is `protocol`, whatever the predecessor. This is what existing
    /// generated dissectors register on.
    #[default]
    Historical,
    /// Register on `ip.proto` only when an `ipv4` or `ipv6` predecessor
    /// branches on `protocol`.
    Intended,
}

impl OverridePolicy {
    fn routes_to_ip_proto(self, previous: &str, field: &str) -> bool {
        match self {
            OverridePolicy::Historical => previous == "ipv4" || field == "protocol",
            OverridePolicy::Intended => {
                matches!(previous, "ipv4" | "ipv6") && field == "protocol"
            }
        }
    }
}

/// `DissectorTable.get(table):add(key, ...)` target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRegistration {
    pub table: String,
    pub key: String,
}

/// Pick the table and key a generated dissector registers on.
///
/// Overrides compare against the branch field as written in the graph; the
/// table name itself is emitted lower-cased.
///
/// # Examples
/// ```
/// use p4shark_core::{BranchValue, Dependency, OverridePolicy, resolve_registration};
///
/// let dependency = Dependency {
///     protocol_name: "tcp",
///     ordered_fields: &[],
///     previous_protocol_name: "ipv4",
///     branch_field_name: "protocol",
///     branch_value: BranchValue::Value(6),
/// };
/// let registration = resolve_registration(&dependency, OverridePolicy::Historical);
/// assert_eq!(registration.table, "ip.proto");
/// assert_eq!(registration.key, "6");
/// ```
pub fn resolve_registration(
    dependency: &Dependency<'_>,
    policy: OverridePolicy,
) -> TableRegistration {
    let previous = dependency.previous_protocol_name;
    let field = dependency.branch_field_name;

    let table = if policy.routes_to_ip_proto(previous, field) {
        IP_PROTO_TABLE.to_string()
    } else if previous == "tcp" && field == "port" {
        TCP_PORT_TABLE.to_string()
    } else {
        field.to_lowercase()
    };

    TableRegistration {
        table,
        key: dependency.branch_value.to_string().to_lowercase(),
    }
}
