pub mod manual_source;
