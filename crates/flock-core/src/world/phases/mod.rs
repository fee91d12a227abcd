mod index;
mod steering;
mod targets;
