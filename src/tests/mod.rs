mod common;
mod factory_end_to_end;
