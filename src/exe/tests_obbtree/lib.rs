mod scenes;
mod properties;
mod refit;
mod threading;
