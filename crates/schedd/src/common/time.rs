use std::time::Duration;

/// Newtype around a value parsed from the command line by `$parser`.
#[macro_export]
macro_rules! arg_wrapper {
    ($name:ident, $wrapped_type:ty, $parser:expr) => {
        #[derive(Clone, Debug)]
        pub struct $name($wrapped_type);

        impl ::std::str::FromStr for $name {
            type Err = ::anyhow::Error;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                ::std::result::Result::Ok(Self($parser(s)?))
            }
        }

        impl $name {
            pub fn get(&self) -> &$wrapped_type {
                &self.0
            }
            pub fn unpack(self) -> $wrapped_type {
                self.0
            }
        }
    };
}

// Allows specifying humantime format (2h, 3m, etc.)
crate::arg_wrapper!(ArgDuration, Duration, humantime::parse_duration);

pub fn format_duration(duration: Duration) -> String {
    humantime::format_duration(duration).to_string()
}
