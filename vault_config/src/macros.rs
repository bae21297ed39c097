/// Macro to create a configuration value group struct.
///
/// Usage:
/// ```rust
/// mod upload {
///     vault_config::config_group!({
///         ref max_concurrent_uploads: usize = 0;
///         ref user_agent: String = "filevault".to_string();
///     });
/// }
///
/// let group = upload::ConfigValueGroup::new();
/// assert_eq!(group.max_concurrent_uploads, 0);
/// ```
///
/// This creates a `ConfigValueGroup` struct with the specified fields, a `Default` impl holding the
/// declared defaults, and `apply_env_overrides()` which reads `FILEVAULT_<GROUP>_<FIELD>` where the
/// group name is the last segment of the enclosing module path.
#[macro_export]
macro_rules! config_group {
    ({
        $(
            $(#[$meta:meta])*
            ref $name:ident : $type:ty = $value:expr;
        )+
    }) => {
        #[allow(unused_imports)]
        use $crate::ParsableConfigValue;

        /// ConfigValueGroup struct containing all configurable values
        #[derive(Debug, Clone, PartialEq)]
        pub struct ConfigValueGroup {
            $(
                $(#[$meta])*
                #[allow(non_snake_case)]
                pub $name: $type,
            )+
        }

        impl Default for ConfigValueGroup {
            /// Create a new instance with default values only (no environment variable overrides).
            fn default() -> Self {
                Self {
                    $(
                        $name: {
                            let v: $type = $value;
                            v
                        },
                    )+
                }
            }
        }

        impl ConfigValueGroup {
            /// Create a new instance with default values only (no environment variable overrides).
            pub fn new() -> Self {
                Self::default()
            }

            /// Name of the group, taken from the enclosing module.
            pub fn group_name() -> &'static str {
                module_path!().rsplit("::").next().unwrap_or("unknown")
            }

            /// Apply environment variable overrides to this configuration group.
            pub fn apply_env_overrides(&mut self) {
                let group_name = Self::group_name();

                $(
                    let env_var_name = $crate::macros::env_var_name(group_name, stringify!($name));
                    let maybe_env_value = std::env::var(&env_var_name).ok();
                    let current_value: $type = self.$name.clone();
                    self.$name = <$type>::parse(&env_var_name, maybe_env_value, current_value);
                )+
            }
        }

        /// Type alias for easier reference in config aggregation
        pub(crate) type ConfigValues = ConfigValueGroup;
    };
}

pub use utils::configuration_utils::env_var_name;
