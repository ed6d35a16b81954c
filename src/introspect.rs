//! Operator-facing listing of sensor classes and their arguments.
//!
//! Output format:
//!
//! ```text
//! Discovered Sensor Classes:
//!
//! OWFS (OWFS 1-Wire temperature sensors)
//!     owfs_path - (str) Absolute path to the OWFS mountpoint. ...
//!
//! ```

use std::fmt;
use std::sync::Arc;

use crate::sensor::{ParamSpec, SensorClass, SensorRegistry};

/// Header printed above the class list.
pub const LISTING_HEADER: &str = "Discovered Sensor Classes:";

/// Displayable listing of sensor classes.
pub struct ClassListing<'a> {
    classes: &'a [Arc<dyn SensorClass>],
}

impl<'a> ClassListing<'a> {
    /// Listing for the given classes.
    pub fn new(classes: &'a [Arc<dyn SensorClass>]) -> Self {
        Self { classes }
    }
}

impl fmt::Display for ClassListing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{LISTING_HEADER}")?;
        writeln!(f)?;
        for class in self.classes {
            writeln!(f, "{} ({})", class.name(), class.description())?;
            for param in class.params() {
                writeln!(f, "    {}", format_param(param))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Render one parameter as `name[=default] - [(type) ]description`.
pub fn format_param(param: &ParamSpec) -> String {
    let name = match param.default {
        Some(default) => format!("{}={}", param.name, default),
        None => param.name.to_string(),
    };
    let description = collapse_whitespace(param.description);
    match param.type_name {
        Some(type_name) => format!("{name} - ({type_name}) {description}"),
        None => format!("{name} - {description}"),
    }
}

/// Print the listing for every class in the registry to stdout.
pub fn list_classes(registry: &SensorRegistry) {
    print!("{}", ClassListing::new(registry.classes()));
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::{Sensor, SensorArgs, SensorContext, SensorError};

    struct DocumentedClass;

    const DOCUMENTED_PARAMS: &[ParamSpec] = &[
        ParamSpec::new("argOne", "arg one info").with_type("int"),
        ParamSpec::new("argTwo", "arg two info is a\n          long\n          line"),
        ParamSpec::new("kwarg1", "kwarg1 info")
            .with_type("str")
            .with_default("foo"),
    ];

    #[async_trait::async_trait]
    impl SensorClass for DocumentedClass {
        fn name(&self) -> &str {
            "clsone"
        }

        fn description(&self) -> &str {
            "desc1"
        }

        fn params(&self) -> &[ParamSpec] {
            DOCUMENTED_PARAMS
        }

        async fn build(
            &self,
            _ctx: &SensorContext,
            _args: &SensorArgs,
        ) -> Result<Box<dyn Sensor>, SensorError> {
            Err(SensorError::Config("listing only".to_string()))
        }
    }

    struct BareClass;

    #[async_trait::async_trait]
    impl SensorClass for BareClass {
        fn name(&self) -> &str {
            "cls2"
        }

        async fn build(
            &self,
            _ctx: &SensorContext,
            _args: &SensorArgs,
        ) -> Result<Box<dyn Sensor>, SensorError> {
            Err(SensorError::Config("listing only".to_string()))
        }
    }

    #[test]
    fn test_listing_format() {
        let classes: Vec<Arc<dyn SensorClass>> =
            vec![Arc::new(DocumentedClass), Arc::new(BareClass)];
        let out = ClassListing::new(&classes).to_string();

        let expected = "Discovered Sensor Classes:\n\n\
                        clsone (desc1)\n\
                        \x20   argOne - (int) arg one info\n\
                        \x20   argTwo - arg two info is a long line\n\
                        \x20   kwarg1=foo - (str) kwarg1 info\n\
                        \n\
                        cls2 (Unknown)\n\n";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_empty_listing() {
        assert_eq!(
            ClassListing::new(&[]).to_string(),
            "Discovered Sensor Classes:\n\n"
        );
    }

    #[test]
    fn test_builtin_listing_mentions_owfs_path() {
        let registry = SensorRegistry::builtin();
        let out = ClassListing::new(registry.classes()).to_string();
        assert!(out.contains("OWFS (OWFS 1-Wire temperature sensors)\n"));
        assert!(out.contains(
            "    owfs_path - (str) Absolute path to the OWFS mountpoint. \
             If not specified, some common defaults will be tried.\n"
        ));
    }
}
