mod impairments;
mod util;
