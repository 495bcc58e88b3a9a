pub mod cache_paths;
