mod cli;
mod documents;
