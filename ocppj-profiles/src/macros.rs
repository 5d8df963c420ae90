/// Declare a wire enumeration: serde renames every variant to its OCPP
/// constant and the type implements [`ocppj::OcppEnum`] under `$registry`.
macro_rules! ocpp_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident as $registry:literal {
            $($variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl ocppj::OcppEnum for $name {
            const NAME: &'static str = $registry;
            const VARIANTS: &'static [&'static str] = &[$($wire),+];

            fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(ocppj::OcppEnum::as_str(self))
            }
        }
    };
}

/// Register each listed enumeration, counting the names that were new
macro_rules! register_all {
    ($($ty:ty),+ $(,)?) => {{
        let mut count = 0;
        $(
            if ocppj::validate::register::<$ty>() {
                count += 1;
            }
        )+
        count
    }};
}

/// Bind a request type to its response, action name and initiator
macro_rules! request {
    ($request:ty => $response:ty, $action:literal, $initiator:ident) => {
        impl ocppj::Request for $request {
            type Response = $response;
            const ACTION: &'static str = $action;
            const INITIATOR: ocppj::Initiator = ocppj::Initiator::$initiator;
        }
    };
}
