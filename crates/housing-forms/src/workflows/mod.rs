pub mod mcr;
