use super::*;

mod end_to_end;
