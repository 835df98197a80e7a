use lazy_static::lazy_static;

pub mod fasta;
pub(crate) mod index_map;
pub mod io;

#[cfg(test)]
pub(crate) mod evolve;

lazy_static! {
    /// Return the number of cpus as a String
    pub static ref NUM_CPU: String = num_cpus::get().to_string();
}
