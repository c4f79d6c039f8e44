mod allocation;
mod common;
mod routing;
