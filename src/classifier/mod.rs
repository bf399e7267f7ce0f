mod bayes;
mod tokenize;

pub use bayes::NaiveBayesClassifier;
