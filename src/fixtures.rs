#[cfg(test)]
pub mod test {
    use std::time::Duration;

    use crate::convert::Reader;
    use crate::failure::FailureReason;

    crate::config_record! {
        /// A trip with everything defaulted.
        #[derive(Debug, Clone, PartialEq)]
        pub struct Holiday {
            pub r#where: String = "last resort".to_string(),
            pub how_long: Duration = Duration::from_secs(7 * 86_400),
        }
    }

    crate::config_record! {
        #[derive(Debug, PartialEq)]
        pub struct Foo {
            pub a: i32,
        }
    }

    crate::config_record! {
        #[derive(Debug, PartialEq)]
        pub struct FooOpt {
            pub a: Option<i32>,
        }
    }

    crate::config_record! {
        #[derive(Debug, Clone, PartialEq)]
        pub struct Server {
            pub host: String,
            pub port: u16,
        }
    }

    crate::config_record! {
        #[derive(Debug, PartialEq)]
        pub struct Cluster {
            pub servers: Vec<Server>,
        }
    }

    crate::config_enum! {
        #[derive(Debug, Clone, PartialEq)]
        pub enum Figure {
            Circle { radius: f64 },
            RoundedRect { width: f64, height: f64, corner: f64 = 0.5 },
            Point,
        }
    }

    crate::config_enumeration! {
        #[derive(Debug, Clone, Copy, PartialEq)]
        pub enum Color {
            Red,
            DarkBlue,
        }
    }

    // -- Self-referential shapes --------------------------------------------

    crate::config_record! {
        #[derive(Debug)]
        pub struct Node {
            pub value: i32,
            pub next: Option<Box<Node>>,
        }
    }

    crate::config_enum! {
        #[derive(Debug)]
        pub enum Tree {
            Leaf { value: i32 },
            Branch { children: Vec<Tree> },
        }
    }

    // -- Refined scalar -----------------------------------------------------

    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct Port(pub u16);

    /// Integers in `[0, 65536)`.
    pub fn port_reader() -> Reader<Port> {
        Reader::<i64>::of().emap(|n| match u16::try_from(n) {
            Ok(port) => Ok(Port(port)),
            Err(_) => Err(FailureReason::cannot_convert(
                n.to_string(),
                "Port",
                "must be in the range [0, 65536)",
            )),
        })
    }
}
